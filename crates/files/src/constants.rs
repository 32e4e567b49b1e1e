/// Directory under the data directory holding every upload.
pub const UPLOADS_FOLDER_NAME: &str = "uploads";

/// Directory under the uploads root holding images.
pub const IMAGES_FOLDER_NAME: &str = "images";

/// URL prefix the uploads root is served under.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";
