pub mod status;
pub mod upload;
pub mod web_form;
