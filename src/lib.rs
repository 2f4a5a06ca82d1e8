pub mod cloud;
pub mod error;
pub mod runner;
pub mod sim;
pub mod viz;

#[cfg(test)]
mod test;
