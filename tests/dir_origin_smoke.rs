use emblemgen::{png, AssetPath, Bitmap, DirOrigin, EmblemRequest, EmblemService, Layer, NoCache, ServiceConfig};
use std::path::Path;

fn put(root: &Path, path: &AssetPath, body: &[u8]) {
    let mut file = root.to_path_buf();
    file.extend(path.segments());
    std::fs::create_dir_all(file.parent().unwrap()).unwrap();
    std::fs::write(file, body).unwrap();
}

#[tokio::test]
async fn renders_every_background_from_a_directory() {
    let root = std::env::temp_dir().join(format!("emblemgen-smoke-{}", std::process::id()));
    let fg = png::encode(&Bitmap::filled(8, 8, [0, 0, 255, 255]));
    let bg = png::encode(&Bitmap::filled(8, 8, [255, 255, 0, 255]));
    put(&root, &AssetPath::sprite(Layer::Foreground, 63).unwrap(), &fg);
    for i in 0..Layer::Background.names().len() {
        put(&root, &AssetPath::sprite(Layer::Background, i).unwrap(), &bg);
    }

    let svc = EmblemService::new(DirOrigin::new(&root), NoCache, ServiceConfig::default());
    for eb in 0..32 {
        let req: EmblemRequest = format!("P2-S11-EP0-ES4-EF63-EB{}-ET0", eb).parse().unwrap();
        let body = svc.render(&req).await.unwrap();
        // blue-only mark drawn fully in ES (Gold)
        let img = png::decode(&body).unwrap();
        assert_eq!(img.pixel(7, 7), Some([255, 204, 0, 255]), "EB{}", eb);
    }

    let _ = std::fs::remove_dir_all(&root);
}
