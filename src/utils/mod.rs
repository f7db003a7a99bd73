pub(crate) mod logging;
#[cfg(test)]
pub(crate) mod test_server;
pub mod validate;
