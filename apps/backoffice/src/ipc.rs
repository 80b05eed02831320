//! # Tauri Command Handlers
//!
//! The webview's `invoke('name', { args })` lands here. Each handler pulls
//! the state it needs out of Tauri and hands over to the command of the
//! same name in `commands/`, where the work and the tests live.
//!
//! ```text
//! invoke('add_to_cart', { args: { productId, quantity } })
//!        │
//!        ▼
//! ipc::add_to_cart(State<DbState>, State<CartState>, State<ConfigState>, args)
//!        │
//!        ▼
//! commands::cart::add_to_cart(&DbState, &CartState, &ConfigState, args)
//! ```
//!
//! Errors reach the front end as `{ code, message }`.

use tauri::State;

use crate::commands::booking::{
    self, BlockSlotArgs, BookingStatusArgs, CreateSlotArgs, ListSlotsArgs,
};
use crate::commands::cart::{
    self, AddToCartArgs, CartCustomerArgs, CartResponse, LineDiscountArgs, ProductIdArgs,
    UpdateQuantityArgs,
};
use crate::commands::catalog::{self, MaterialArgs, RateHistoryArgs, SetRateArgs, StoneArgs};
use crate::commands::checkout::{
    self, AddPaymentArgs, CheckoutArgs, InvoiceNumberArgs, InvoiceText, RecordPdfArgs, VoidArgs,
};
use crate::commands::config::{self, FormatArgs, FormattedAmount, ParseArgs};
use crate::commands::customer::{
    self, CustomerArgs, CustomerIdArgs, CustomerSearchArgs, PhoneArgs, WishlistArgs,
    WishlistToggled,
};
use crate::commands::product::{
    self, AdjustStockArgs, CategoryArgs, LowStockArgs, ProductInput, SearchArgs, SkuArgs,
    StockResponse, UpdateProductArgs,
};
use crate::commands::storefront::{
    self, CarouselArgs, CollectionArgs, CollectionProductArgs, ListArgs, MoveArgs,
    UpdateCarouselArgs, UpdateCollectionArgs,
};
use crate::commands::{Changed, DateArgs, IdArgs, Toggled};
use crate::error::ApiResult;
use crate::state::{CartState, ConfigState, DbState};
use lustre_core::booking::{AvailabilitySlot, Booking, NewBooking};
use lustre_core::invoice::Invoice;
use lustre_core::storefront::{CarouselItem, ThemedCollection};
use lustre_core::{AppConfig, Customer, Material, MetalRate, MetalRates, Product, Stone};
use lustre_db::repository::invoice::DaySummary;

// =============================================================================
// Products
// =============================================================================

#[tauri::command]
pub async fn search_products(db: State<'_, DbState>, args: SearchArgs) -> ApiResult<Vec<Product>> {
    product::search_products(&db, args).await
}

#[tauri::command]
pub async fn get_product(db: State<'_, DbState>, args: IdArgs) -> ApiResult<Product> {
    product::get_product(&db, args).await
}

#[tauri::command]
pub async fn get_product_by_sku(db: State<'_, DbState>, args: SkuArgs) -> ApiResult<Product> {
    product::get_product_by_sku(&db, args).await
}

#[tauri::command]
pub async fn list_category(db: State<'_, DbState>, args: CategoryArgs) -> ApiResult<Vec<Product>> {
    product::list_category(&db, args).await
}

#[tauri::command]
pub async fn low_stock(
    db: State<'_, DbState>,
    config: State<'_, ConfigState>,
    args: LowStockArgs,
) -> ApiResult<Vec<Product>> {
    product::low_stock(&db, &config, args).await
}

#[tauri::command]
pub async fn create_product(db: State<'_, DbState>, args: ProductInput) -> ApiResult<Product> {
    product::create_product(&db, args).await
}

#[tauri::command]
pub async fn update_product(db: State<'_, DbState>, args: UpdateProductArgs) -> ApiResult<Product> {
    product::update_product(&db, args).await
}

#[tauri::command]
pub async fn adjust_stock(
    db: State<'_, DbState>,
    args: AdjustStockArgs,
) -> ApiResult<StockResponse> {
    product::adjust_stock(&db, args).await
}

#[tauri::command]
pub async fn delete_product(db: State<'_, DbState>, args: IdArgs) -> ApiResult<()> {
    product::delete_product(&db, args).await
}

// =============================================================================
// Catalog
// =============================================================================

#[tauri::command]
pub async fn list_materials(db: State<'_, DbState>) -> ApiResult<Vec<Material>> {
    catalog::list_materials(&db).await
}

#[tauri::command]
pub async fn create_material(db: State<'_, DbState>, args: MaterialArgs) -> ApiResult<Material> {
    catalog::create_material(&db, args).await
}

#[tauri::command]
pub async fn list_stones(db: State<'_, DbState>) -> ApiResult<Vec<Stone>> {
    catalog::list_stones(&db).await
}

#[tauri::command]
pub async fn get_stone(db: State<'_, DbState>, args: IdArgs) -> ApiResult<Stone> {
    catalog::get_stone(&db, args).await
}

#[tauri::command]
pub async fn upsert_stone(db: State<'_, DbState>, args: StoneArgs) -> ApiResult<Stone> {
    catalog::upsert_stone(&db, args).await
}

#[tauri::command]
pub async fn set_metal_rate(db: State<'_, DbState>, args: SetRateArgs) -> ApiResult<MetalRate> {
    catalog::set_metal_rate(&db, args).await
}

#[tauri::command]
pub async fn rate_board(db: State<'_, DbState>) -> ApiResult<MetalRates> {
    catalog::rate_board(&db).await
}

#[tauri::command]
pub async fn rate_history(
    db: State<'_, DbState>,
    args: RateHistoryArgs,
) -> ApiResult<Vec<MetalRate>> {
    catalog::rate_history(&db, args).await
}

// =============================================================================
// Customers
// =============================================================================

#[tauri::command]
pub async fn save_customer(db: State<'_, DbState>, args: CustomerArgs) -> ApiResult<Customer> {
    customer::save_customer(&db, args).await
}

#[tauri::command]
pub async fn find_customer(db: State<'_, DbState>, args: PhoneArgs) -> ApiResult<Customer> {
    customer::find_customer(&db, args).await
}

#[tauri::command]
pub async fn search_customers(
    db: State<'_, DbState>,
    args: CustomerSearchArgs,
) -> ApiResult<Vec<Customer>> {
    customer::search_customers(&db, args).await
}

#[tauri::command]
pub async fn toggle_wishlist(
    db: State<'_, DbState>,
    args: WishlistArgs,
) -> ApiResult<WishlistToggled> {
    customer::toggle_wishlist(&db, args).await
}

#[tauri::command]
pub async fn wishlist(db: State<'_, DbState>, args: CustomerIdArgs) -> ApiResult<Vec<Product>> {
    customer::wishlist(&db, args).await
}

// =============================================================================
// Cart
// =============================================================================

#[tauri::command]
pub fn get_cart(
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
) -> ApiResult<CartResponse> {
    cart::get_cart(&cart, &config)
}

#[tauri::command]
pub async fn add_to_cart(
    db: State<'_, DbState>,
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: AddToCartArgs,
) -> ApiResult<CartResponse> {
    cart::add_to_cart(&db, &cart, &config, args).await
}

#[tauri::command]
pub async fn update_cart_item(
    db: State<'_, DbState>,
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: UpdateQuantityArgs,
) -> ApiResult<CartResponse> {
    cart::update_cart_item(&db, &cart, &config, args).await
}

#[tauri::command]
pub fn set_line_discount(
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: LineDiscountArgs,
) -> ApiResult<CartResponse> {
    cart::set_line_discount(&cart, &config, args)
}

#[tauri::command]
pub fn remove_from_cart(
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: ProductIdArgs,
) -> ApiResult<CartResponse> {
    cart::remove_from_cart(&cart, &config, args)
}

#[tauri::command]
pub fn clear_cart(
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
) -> ApiResult<CartResponse> {
    cart::clear_cart(&cart, &config)
}

#[tauri::command]
pub async fn set_cart_customer(
    db: State<'_, DbState>,
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: CartCustomerArgs,
) -> ApiResult<CartResponse> {
    cart::set_cart_customer(&db, &cart, &config, args).await
}

#[tauri::command]
pub async fn refresh_cart_rates(
    db: State<'_, DbState>,
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
) -> ApiResult<CartResponse> {
    cart::refresh_cart_rates(&db, &cart, &config).await
}

// =============================================================================
// Checkout & Invoices
// =============================================================================

#[tauri::command]
pub async fn preview_invoice(
    db: State<'_, DbState>,
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: CheckoutArgs,
) -> ApiResult<Invoice> {
    checkout::preview_invoice(&db, &cart, &config, args).await
}

#[tauri::command]
pub async fn checkout(
    db: State<'_, DbState>,
    cart: State<'_, CartState>,
    config: State<'_, ConfigState>,
    args: CheckoutArgs,
) -> ApiResult<Invoice> {
    checkout::checkout(&db, &cart, &config, args).await
}

#[tauri::command]
pub async fn add_payment(db: State<'_, DbState>, args: AddPaymentArgs) -> ApiResult<Invoice> {
    checkout::add_payment(&db, args).await
}

#[tauri::command]
pub async fn void_invoice(db: State<'_, DbState>, args: VoidArgs) -> ApiResult<Invoice> {
    checkout::void_invoice(&db, args).await
}

#[tauri::command]
pub async fn get_invoice(db: State<'_, DbState>, args: IdArgs) -> ApiResult<Invoice> {
    checkout::get_invoice(&db, args).await
}

#[tauri::command]
pub async fn get_invoice_by_number(
    db: State<'_, DbState>,
    args: InvoiceNumberArgs,
) -> ApiResult<Invoice> {
    checkout::get_invoice_by_number(&db, args).await
}

#[tauri::command]
pub async fn list_invoices(db: State<'_, DbState>, args: DateArgs) -> ApiResult<Vec<Invoice>> {
    checkout::list_invoices(&db, args).await
}

#[tauri::command]
pub async fn day_summary(db: State<'_, DbState>, args: DateArgs) -> ApiResult<DaySummary> {
    checkout::day_summary(&db, args).await
}

#[tauri::command]
pub async fn invoice_text(
    db: State<'_, DbState>,
    config: State<'_, ConfigState>,
    args: IdArgs,
) -> ApiResult<InvoiceText> {
    checkout::invoice_text(&db, &config, args).await
}

#[tauri::command]
pub async fn record_invoice_pdf(db: State<'_, DbState>, args: RecordPdfArgs) -> ApiResult<Invoice> {
    checkout::record_invoice_pdf(&db, args).await
}

// =============================================================================
// Appointments
// =============================================================================

#[tauri::command]
pub async fn open_day(
    db: State<'_, DbState>,
    config: State<'_, ConfigState>,
    args: DateArgs,
) -> ApiResult<Vec<AvailabilitySlot>> {
    booking::open_day(&db, &config, args).await
}

#[tauri::command]
pub async fn create_slot(
    db: State<'_, DbState>,
    config: State<'_, ConfigState>,
    args: CreateSlotArgs,
) -> ApiResult<AvailabilitySlot> {
    booking::create_slot(&db, &config, args).await
}

#[tauri::command]
pub async fn list_slots(
    db: State<'_, DbState>,
    args: ListSlotsArgs,
) -> ApiResult<Vec<AvailabilitySlot>> {
    booking::list_slots(&db, args).await
}

#[tauri::command]
pub async fn block_slot(
    db: State<'_, DbState>,
    args: BlockSlotArgs,
) -> ApiResult<AvailabilitySlot> {
    booking::block_slot(&db, args).await
}

#[tauri::command]
pub async fn delete_slot(db: State<'_, DbState>, args: IdArgs) -> ApiResult<()> {
    booking::delete_slot(&db, args).await
}

#[tauri::command]
pub async fn book_appointment(db: State<'_, DbState>, args: NewBooking) -> ApiResult<Booking> {
    booking::book_appointment(&db, args).await
}

#[tauri::command]
pub async fn get_booking(db: State<'_, DbState>, args: IdArgs) -> ApiResult<Booking> {
    booking::get_booking(&db, args).await
}

#[tauri::command]
pub async fn list_bookings(db: State<'_, DbState>, args: DateArgs) -> ApiResult<Vec<Booking>> {
    booking::list_bookings(&db, args).await
}

#[tauri::command]
pub async fn update_booking_status(
    db: State<'_, DbState>,
    args: BookingStatusArgs,
) -> ApiResult<Booking> {
    booking::update_booking_status(&db, args).await
}

// =============================================================================
// Storefront
// =============================================================================

#[tauri::command]
pub async fn list_collections(
    db: State<'_, DbState>,
    args: ListArgs,
) -> ApiResult<Vec<ThemedCollection>> {
    storefront::list_collections(&db, args).await
}

#[tauri::command]
pub async fn get_collection(db: State<'_, DbState>, args: IdArgs) -> ApiResult<ThemedCollection> {
    storefront::get_collection(&db, args).await
}

#[tauri::command]
pub async fn create_collection(
    db: State<'_, DbState>,
    args: CollectionArgs,
) -> ApiResult<ThemedCollection> {
    storefront::create_collection(&db, args).await
}

#[tauri::command]
pub async fn update_collection(
    db: State<'_, DbState>,
    args: UpdateCollectionArgs,
) -> ApiResult<ThemedCollection> {
    storefront::update_collection(&db, args).await
}

#[tauri::command]
pub async fn delete_collection(db: State<'_, DbState>, args: IdArgs) -> ApiResult<()> {
    storefront::delete_collection(&db, args).await
}

#[tauri::command]
pub async fn toggle_collection(db: State<'_, DbState>, args: IdArgs) -> ApiResult<Toggled> {
    storefront::toggle_collection(&db, args).await
}

#[tauri::command]
pub async fn move_collection(
    db: State<'_, DbState>,
    args: MoveArgs,
) -> ApiResult<Vec<ThemedCollection>> {
    storefront::move_collection(&db, args).await
}

#[tauri::command]
pub async fn add_to_collection(
    db: State<'_, DbState>,
    args: CollectionProductArgs,
) -> ApiResult<Changed> {
    storefront::add_to_collection(&db, args).await
}

#[tauri::command]
pub async fn remove_from_collection(
    db: State<'_, DbState>,
    args: CollectionProductArgs,
) -> ApiResult<Changed> {
    storefront::remove_from_collection(&db, args).await
}

#[tauri::command]
pub async fn list_carousel(db: State<'_, DbState>, args: ListArgs) -> ApiResult<Vec<CarouselItem>> {
    storefront::list_carousel(&db, args).await
}

#[tauri::command]
pub async fn create_carousel_item(
    db: State<'_, DbState>,
    args: CarouselArgs,
) -> ApiResult<CarouselItem> {
    storefront::create_carousel_item(&db, args).await
}

#[tauri::command]
pub async fn update_carousel_item(
    db: State<'_, DbState>,
    args: UpdateCarouselArgs,
) -> ApiResult<CarouselItem> {
    storefront::update_carousel_item(&db, args).await
}

#[tauri::command]
pub async fn delete_carousel_item(db: State<'_, DbState>, args: IdArgs) -> ApiResult<()> {
    storefront::delete_carousel_item(&db, args).await
}

#[tauri::command]
pub async fn toggle_carousel_item(db: State<'_, DbState>, args: IdArgs) -> ApiResult<Toggled> {
    storefront::toggle_carousel_item(&db, args).await
}

#[tauri::command]
pub async fn move_carousel_item(
    db: State<'_, DbState>,
    args: MoveArgs,
) -> ApiResult<Vec<CarouselItem>> {
    storefront::move_carousel_item(&db, args).await
}

// =============================================================================
// Settings
// =============================================================================

#[tauri::command]
pub fn get_config(config: State<'_, ConfigState>) -> AppConfig {
    config::get_config(&config)
}

#[tauri::command]
pub async fn save_config(
    db: State<'_, DbState>,
    config: State<'_, ConfigState>,
    args: AppConfig,
) -> ApiResult<AppConfig> {
    config::save_config(&db, &config, args).await
}

#[tauri::command]
pub fn format_amount(config: State<'_, ConfigState>, args: FormatArgs) -> FormattedAmount {
    config::format_amount(&config, args)
}

#[tauri::command]
pub fn parse_amount(config: State<'_, ConfigState>, args: ParseArgs) -> ApiResult<FormattedAmount> {
    config::parse_amount(&config, args)
}
