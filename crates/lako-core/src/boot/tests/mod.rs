#[cfg(test)]
mod config_loader_tests;
