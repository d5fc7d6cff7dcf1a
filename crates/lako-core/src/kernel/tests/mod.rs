#[cfg(test)]
mod data_tests;
