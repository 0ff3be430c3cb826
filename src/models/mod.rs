pub mod booking;
pub mod movie;
pub mod seat;
pub mod showtime;
pub mod theater;
pub mod user;

pub use booking::{Booking, BookingSeat, TicketType};
pub use movie::Movie;
pub use seat::Seat;
pub use showtime::Showtime;
pub use theater::{Auditorium, Theater};
pub use user::User;
