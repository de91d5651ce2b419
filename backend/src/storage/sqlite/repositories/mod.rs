pub mod award_repository;
pub mod child_repository;
pub mod ledger_repository;
pub mod offer_repository;
pub mod reward_repository;
pub mod rollup_repository;

pub use award_repository::AwardRepository;
pub use child_repository::ChildRepository;
pub use ledger_repository::LedgerRepository;
pub use offer_repository::OfferRepository;
pub use reward_repository::RewardRepository;
pub use rollup_repository::RollupRepository;
