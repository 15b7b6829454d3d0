// Application layer: batch jobs built on the domain ports.

pub mod import;
