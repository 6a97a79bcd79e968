//! Fresh-name generation.
//!
//! The generator is owned by the pass that needs it rather than being a
//! process-wide counter, so transforms stay reentrant and testable.

/// Counter-based generator for unique variable names.
#[derive(Debug, Default)]
pub struct NameGen {
    next: u64,
}

impl NameGen {
    /// Create a generator starting at zero.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Produce a fresh name with the given prefix, e.g. `x0`, `x1`, ...
    pub fn unique_name(&mut self, prefix: &str) -> String {
        let name = format!("{}{}", prefix, self.next);
        self.next += 1;
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_names() {
        let mut names = NameGen::new();
        assert_eq!(names.unique_name("x"), "x0");
        assert_eq!(names.unique_name("x"), "x1");
        assert_eq!(names.unique_name("t"), "t2");
    }
}
