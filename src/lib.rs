pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod aes;
    pub mod token;
}

pub mod models {
    pub mod command;
    pub mod reply;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod slots;
    pub mod user;
}

pub mod services {
    pub mod auth;
    pub mod dispatcher;
    pub mod session;
}

pub mod handlers {
    pub mod xhr;
}
