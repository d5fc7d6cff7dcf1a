#[cfg(test)]
mod server_tests;
