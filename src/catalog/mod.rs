mod job;
mod profile;

pub use job::{Job, enumerate};
pub use profile::Profile;
