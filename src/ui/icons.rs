pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const DATABASE: &str = "🗄️";
    pub const BILL: &str = "🧾";
    pub const SHOP: &str = "🏪";
    pub const TAG: &str = "🏷️";
    pub const SAVE: &str = "💾";
    pub const EMPTY: &str = "∅";
}
