pub mod memory;

#[cfg(test)]
pub(crate) mod mock;
