// Crate-level integration tests
#[cfg(test)]
mod integration;
