pub mod company;
pub mod profile;
pub mod research;
