pub mod app;
pub mod clean;
pub mod config;
pub mod error;
pub mod extract;
pub mod keywords;
pub mod language;
pub mod nlp;
pub mod outcome;
pub mod summary;
pub mod translate;
pub mod tts;
pub mod db {
    pub mod article_repository;
    pub mod models;
    pub mod record_repository;
    pub mod repository;
    pub mod user_repository;

    #[cfg(test)]
    pub mod fakes;
}
pub mod storage {
    pub mod gateway;
}
pub mod auth {
    pub mod middleware;
    pub mod models;
    pub mod oauth;
    pub mod password;
    pub mod token;
}
pub mod api {
    pub mod articles;
    pub mod auth;
    pub mod documents;
    pub mod errors;
    pub mod feedback;
    pub mod logging;
    pub mod summaries;
    pub mod support;
    pub mod tags;
    pub mod users;
}
