pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const HASH_BITS: usize = HASH_SIZE * BYTE;
pub const DEFAULT_BLOCK_CAPACITY: usize = 1000;
pub const TRANSACTION_SEPARATOR: &str = "-";
pub const RENDER_SEPARATOR: &str = "-";
pub const TRANSACTION_TEMPLATE_HEAD: &str = "This is a transaction between A and B. We add a random seed here ";
pub const TRANSACTION_TEMPLATE_TAIL: &str = " to make its hash unique";
