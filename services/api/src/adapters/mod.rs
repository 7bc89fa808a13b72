pub mod cache;
pub mod db;
pub mod images;
pub mod mail;

pub use cache::RedisCache;
pub use db::DbAdapter;
pub use images::CloudinaryAdapter;
pub use mail::SmtpMailer;
