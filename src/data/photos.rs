//! Photo entries.

use crate::base::{TypeKey, namespaces};
use crate::model::{EntityKind, ExtensionKind, ExtensionProfile, ModelError};

use super::geo::{self, GeoRssPoint};
use super::kinds::{entry_kind, terms};
use super::media::MediaGroup;
use super::value::text_construct;

text_construct! {
    /// `gphoto:id`
    GphotoId: namespaces::GPHOTO, "id"
}

text_construct! {
    /// `gphoto:albumid`
    GphotoAlbumId: namespaces::GPHOTO, "albumid"
}

fn declare_photo_extensions(
    profile: &mut ExtensionProfile,
    parent: TypeKey,
) -> Result<(), ModelError> {
    profile.declare(parent, GphotoId::descriptor())?;
    profile.declare(parent, GphotoAlbumId::descriptor())?;
    profile.declare(parent, MediaGroup::descriptor())?;
    profile.declare(parent, GeoRssPoint::descriptor())
}

entry_kind! {
    /// An entry marked with the photo kind.
    PhotoEntry, term = terms::PHOTO, declare = declare_photo_extensions
}

impl PhotoEntry {
    pub fn gphoto_id(&self) -> Option<&str> {
        self.base().point().extension::<GphotoId>().map(GphotoId::text)
    }

    pub fn set_gphoto_id(&mut self, id: &str) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(GphotoId::new(id))
    }

    pub fn album_id(&self) -> Option<&str> {
        self.base()
            .point()
            .extension::<GphotoAlbumId>()
            .map(GphotoAlbumId::text)
    }

    pub fn set_album_id(&mut self, id: &str) -> Result<(), ModelError> {
        self.base_mut()
            .point_mut()?
            .set_extension(GphotoAlbumId::new(id))
    }

    pub fn media_group(&self) -> Option<&MediaGroup> {
        self.base().point().extension::<MediaGroup>()
    }

    pub fn set_media_group(&mut self, group: MediaGroup) -> Result<(), ModelError> {
        self.base_mut().point_mut()?.set_extension(group)
    }

    pub fn geo_location(&self) -> Option<(f64, f64)> {
        geo::geo_location(self.base().point())
    }

    /// Set both coordinates, or clear the location with `(None, None)`.
    pub fn set_geo_location(
        &mut self,
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<(), ModelError> {
        geo::set_geo_location(self.base_mut().point_mut()?, latitude, longitude)
    }
}
