pub mod article_model;
