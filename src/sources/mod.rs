//! Configuration source implementations.
//!
//! Each source produces a [`Fragment`](crate::source::Fragment): YAML files,
//! schema-bound environment variables, and programmatic input.

mod env_source;
mod input;
mod yaml_source;

pub use env_source::EnvVars;
pub use input::{Input, PartialInput};
pub use yaml_source::{Yaml, DEFAULT_FILE_NAMES, DEFAULT_SEARCH_DIRS};

/// 1-indexed line number of a byte offset.
pub(crate) fn line_from_offset(content: &str, offset: usize) -> u32 {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count() as u32
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_from_offset() {
        let content = "a: 1\nb: 2\nc: 3\n";
        assert_eq!(line_from_offset(content, 0), 1);
        assert_eq!(line_from_offset(content, 5), 2);
        assert_eq!(line_from_offset(content, 10), 3);
        assert_eq!(line_from_offset(content, 1000), 4);
    }
}
