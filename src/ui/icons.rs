pub struct Icons;

impl Icons {
    pub const BOOK: &str = "📖";
    pub const BOOKS: &str = "📚";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const CHAT: &str = "💬";
    pub const DATABASE: &str = "🗄️";
    pub const SCROLL: &str = "📜";
    pub const DEL: &str = "🗑️";
    pub const GEAR: &str = "⚙️";
    pub const PERSON: &str = "👤";
    pub const ROBOT: &str = "🤖";
    pub const WRENCH: &str = "🔧";
}
