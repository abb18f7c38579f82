pub mod csv_sink;
pub mod sink;
pub mod xlsx_sink;
