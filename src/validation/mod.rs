pub mod manifest_validator;

pub use manifest_validator::{ManifestValidator, PackedFile, ValidationResult, validate_package_name};
