pub mod articles_handler;
