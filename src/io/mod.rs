pub mod csv_file;
pub mod excel_read;
pub mod excel_write;
pub mod xml_read;
pub mod xml_write;
