// Vehicle catalog module
// Paged CRUD over listings with attached image references

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

pub use error::ProductError;
pub use handlers::{
    create_product_handler, delete_image_handler, delete_product_handler, get_product_handler,
    list_products_handler, update_product_handler, upload_images_handler,
};
pub use models::{
    CreateProduct, ListProductsQuery, Product, ProductImage, ProductImageResponse,
    ProductListResponse, ProductResponse, UpdateProduct,
};
pub use repository::{ImagesRepository, ProductsRepository};
