pub mod formatting;

pub use formatting::{
    is_valid_postal_code, is_valid_registry_number, normalize_postal_code,
    normalize_registry_number, postal_prefix,
};
