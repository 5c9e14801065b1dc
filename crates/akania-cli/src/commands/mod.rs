mod extract;
mod profiles;
mod setup;

pub use extract::{extract_batch, extract_single};
pub use profiles::list_profiles;
pub use setup::{create_sample_files, validate_setup};
