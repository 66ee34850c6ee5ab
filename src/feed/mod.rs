// Feed - Input boundary turning raw exchange messages into TradeEvents

pub mod parser;

pub use parser::{FeedParseError, FeedParserStats, TradeParser};
