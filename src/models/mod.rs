pub mod admin;
pub mod changelog;
pub mod image;
pub mod job;
pub mod owner;
pub mod property;
pub mod transfer;
pub mod user;

pub use admin::AdminStats;
pub use changelog::{ChangeLogEntry, NewChangeLogEntry};
pub use image::{Image, ImageTarget};
pub use job::{Job, JobAccess, JobStatus, NewJob};
pub use owner::{NewOwner, Owner, OwnerUpdate};
pub use property::{
    Asset, AssetUpdate, Feature, NewAsset, NewFeature, NewProperty, NewSpace, Property,
    PropertyDetail, PropertyStatus, PropertyUpdate, Space, SpaceDetail, SpaceUpdate,
};
pub use transfer::{NewTransfer, Transfer, TransferDirection, TransferStatus};
pub use user::{ProfileUpdate, User};
