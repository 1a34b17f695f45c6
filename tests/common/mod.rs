//! Shared fixtures for the integration tests.

use exprgraph::{Context, Signature, SignatureRegistry, signature};

pub fn signatures() -> Vec<Signature> {
    vec![
        signature!("Filter.eq(name: String, value: Object) -> Filter"),
        signature!("Filter.and(filters: List) -> Filter"),
        signature!("Image.load(id: String, version?: Long) -> Image"),
        signature!("Image.constant(value: Object) -> Image"),
        signature!("Image.add(image1: Image, image2: Image) -> Image"),
        signature!("Image.multiply(image1: Image, image2: Image) -> Image"),
        signature!("Image.select(input: Image, bandSelectors: List, newNames?: List) -> Image"),
        signature!("ImageCollection.load(id: String) -> ImageCollection"),
        signature!("ImageCollection.map(collection: ImageCollection, baseAlgorithm: Algorithm) -> ImageCollection"),
        signature!("Collection.filter(collection: FeatureCollection, filter: Filter) -> FeatureCollection"),
        signature!("Collection.loadTable(tableId: Object) -> FeatureCollection"),
        signature!("Number.add(left: Number, right: Number) -> Number"),
        signature!("Dictionary.get(dictionary: Dictionary, key: String) -> Object"),
        signature!("Date(value: Object, timeZone?: String) -> Date"),
        signature!("Kernel.gaussian(radius: Float, sigma?: Float) -> Kernel"),
        signature!("Image.convolve(image: Image, kernel: Kernel) -> Image"),
    ]
}

pub fn context() -> Context {
    Context::new(SignatureRegistry::from_signatures(signatures()))
}
