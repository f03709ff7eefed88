//! Small validation helpers shared by the configuration checks.
use std::ops::RangeInclusive;

/// Validates that a class folder name is usable as a single directory level.
///
/// # Arguments
///
/// * `name` - Folder name, with or without a leading `/`.
///
/// # Returns
///
/// * `Ok(())` if the name is a single non-empty path component.
/// * `Err(&'static str)` otherwise.
pub fn is_valid_folder(name: &str) -> Result<(), &'static str> {
    let trimmed = name.strip_prefix('/').unwrap_or(name);
    if trimmed.is_empty() {
        return Err("Folder name cannot be empty");
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err("Folder name must be a single path component");
    }
    if trimmed == "." || trimmed == ".." {
        return Err("Folder name cannot be a relative path marker");
    }
    is_valid_path(trimmed)
}

/// Validates if a given string is a valid file path.
///
/// # Arguments
///
/// * `path` - The string to validate.
///
/// # Returns
///
/// * `Ok(())` if the file path is valid.
/// * `Err(&'static str)` if the file path is invalid.
pub fn is_valid_path(path: &str) -> Result<(), &'static str> {
    if path.is_empty() {
        return Err("File path cannot be empty");
    }
    if path.contains('\0') {
        return Err("File path cannot contain null bytes");
    }
    Ok(())
}

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates if a given string is not empty.
pub fn is_not_empty(value: &str) -> Result<(), &'static str> {
    if !value.is_empty() {
        Ok(())
    } else {
        Err("Value cannot be empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_names() {
        assert!(is_valid_folder("/110001").is_ok());
        assert!(is_valid_folder("210001").is_ok());
        assert!(is_valid_folder("/").is_err());
        assert!(is_valid_folder("a/b").is_err());
        assert!(is_valid_folder("..").is_err());
    }

    #[test]
    fn ranges() {
        assert!(is_in_range(5u32, 1..=10).is_ok());
        assert!(is_in_range(0u32, 1..=10).is_err());
        assert!(is_not_empty("").is_err());
    }
}
