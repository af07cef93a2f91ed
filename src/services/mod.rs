pub mod pdf_service;
pub mod qr_service;
