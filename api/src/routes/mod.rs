pub mod ask;
pub mod health_route;
pub mod upload_text;

#[cfg(test)]
pub(crate) mod test_support;
