//! Class visibility options for the render settings

/// Number of classes offered before a network has been loaded
pub const DEFAULT_CLASS_COUNT: u32 = 9;

/// Visibility options: `Independent`, `All`, then one entry per output class
///
/// Option index 0 is `Independent`, index 1 is `All`, and class `n` sits at `n + 2`.
pub fn class_options(num_classes: u32) -> Vec<String> {
    let mut options = Vec::with_capacity(num_classes as usize + 2);
    options.push("Independent".to_string());
    options.push("All".to_string());
    options.extend((0..num_classes).map(|class_id| format!("Class {}", class_id)));
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_classes() {
        assert_eq!(class_options(2), vec!["Independent", "All", "Class 0", "Class 1"]);
    }

    #[test]
    fn test_default_options() {
        let options = class_options(DEFAULT_CLASS_COUNT);
        assert_eq!(options.len(), 11);
        assert_eq!(options.last().map(String::as_str), Some("Class 8"));
    }

    #[test]
    fn test_zero_classes_keeps_fixed_options() {
        assert_eq!(class_options(0), vec!["Independent", "All"]);
    }
}
