pub mod serve_cmd;
