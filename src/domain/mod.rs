mod sender_email;

pub use sender_email::SenderEmail;
