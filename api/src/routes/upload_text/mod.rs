pub mod upload_text_request;
pub mod upload_text_route;
