pub use crate::color::{Color, PerturbMode};
pub use crate::command::{Command, Outcome};
pub use crate::common::{Record, RecordErr};
pub use crate::configuration::{ColorDiffMode, ConfigError, GameConfiguration, GridSizing};
pub use crate::difficulty::DifficultyCurve;
pub use crate::game::{GameError, GameResult, Invocation, Reply, RoundPicture, SeeColor};
pub use crate::grid::{FormatError, Reveal, Selector};
pub use crate::ledger::{RankEntry, ScoreLedger};
pub use crate::random::{RandomSource, RngSource, ScriptedSource};
pub use crate::render::{PictureFormat, RasterRenderer, RenderError, RenderedImage, Renderer};
pub use crate::round::Round;
pub use crate::session::GameSession;
pub use crate::store::{Collection, JsonFileStore, MemoryStore, Store, StoreError};
