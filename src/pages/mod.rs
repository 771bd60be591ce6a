pub mod candidate;
pub mod home;
pub mod not_found;
