//! UI configuration served to the back-office front-end.

pub mod data_table;
