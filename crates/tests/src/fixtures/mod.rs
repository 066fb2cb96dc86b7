pub mod media;
pub mod test_app;
