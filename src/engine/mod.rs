pub mod artifact;
pub mod correlation;
pub mod history;
pub mod locator;
