pub mod textgrid_reader;
