pub mod common;

mod atomic_file_propagation;
