pub mod attendance;
pub mod score;
pub mod session;
pub mod sewadar;
pub mod volunteer;

pub use attendance::AttendanceRecord;
pub use score::{DAILY_ATTENDANCE, DEFAULT_GAME_POINTS, GAME_SCORE_CAP, GAMES, ScoreRecord};
pub use session::ViewState;
pub use sewadar::{Gender, Group, Partition, Sewadar};
pub use volunteer::{Role, Volunteer, VolunteerDirectory};
