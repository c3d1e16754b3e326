pub mod booking;
pub mod validator;

pub use booking::AppointmentBookingService;
