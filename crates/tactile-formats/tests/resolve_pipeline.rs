#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! End-to-end resolution over a build laid out on disk
//!
//! A temporary directory stands in for a local CDN mirror: archives and
//! loose files under `data/`, archive indices next to them, and encoding and
//! root files that map FileDataIDs down to those objects.

mod common;

use std::path::Path;

use pretty_assertions::assert_eq;
use tactile_crypto::{
    ContentKey, EncodingKey, FileDataId, Salsa20Cipher, TactKey, TactKeyStore, name_hash,
};
use tactile_formats::archive::{GroupIndexBuilder, IndexReader};
use tactile_formats::blte::{self, DecodeOptions};
use tactile_formats::encoding::EncodingReader;
use tactile_formats::root::{RootFilter, RootReader};
use tactile_formats::{ByteProvider, ContentResolver, LocalCdn, ResolveError, Settings};
use tempfile::TempDir;
use common::{archive_index, blte_chunked, blte_raw, encoding_file, root_file, zlib_chunk};

const SECRET_KEY_NAME: u64 = 0x1122_3344_5566_7788;
const SECRET_KEY: [u8; 16] = [0x5E; 16];

/// One file of the synthetic build
struct Object {
    fdid: u32,
    path: &'static str,
    payload: Vec<u8>,
    encoded: Vec<u8>,
}

impl Object {
    fn ckey(&self) -> ContentKey {
        ContentKey::from_data(&self.payload)
    }

    fn ekey(&self) -> EncodingKey {
        EncodingKey::from_data(&self.encoded)
    }
}

fn encrypted_object() -> Object {
    let head = b"public header, ".to_vec();
    let secret = b"encrypted body".to_vec();

    let mut inner = vec![b'N'];
    inner.extend_from_slice(&secret);
    Salsa20Cipher::new(&SECRET_KEY, &[1, 2, 3, 4], 1)
        .unwrap()
        .apply_keystream(&mut inner);

    let mut envelope = vec![b'E', 8];
    envelope.extend_from_slice(&SECRET_KEY_NAME.to_le_bytes());
    envelope.extend_from_slice(&[4, 1, 2, 3, 4, b'S']);
    envelope.extend(inner);

    let mut raw_head = vec![b'N'];
    raw_head.extend_from_slice(&head);

    let mut payload = head.clone();
    payload.extend_from_slice(&secret);
    Object {
        fdid: 400,
        path: "world/secret.wdt",
        encoded: blte_chunked(&[(raw_head, head.len()), (envelope, secret.len())]),
        payload,
    }
}

fn objects() -> Vec<Object> {
    let archived = b"first archived file".to_vec();
    let compressed: Vec<u8> = (0..20_000u32).map(|i| (i % 13) as u8).collect();
    let loose = b"loose file outside every archive".to_vec();

    vec![
        Object {
            fdid: 100,
            path: "interface/first.lua",
            encoded: blte_raw(&archived),
            payload: archived,
        },
        Object {
            fdid: 200,
            path: "sound/music/theme.ogg",
            encoded: blte_chunked(&[
                (zlib_chunk(&compressed[..8000]), 8000),
                (zlib_chunk(&compressed[8000..]), 12_000),
            ]),
            payload: compressed,
        },
        Object {
            fdid: 300,
            path: "loose.txt",
            encoded: blte_raw(&loose),
            payload: loose,
        },
        encrypted_object(),
    ]
}

/// Write `data` under the CDN layout
fn store(cdn: &LocalCdn, name: &str, data: &[u8]) {
    let path = cdn.object_path(name);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

/// Pack objects into an archive; returns the archive name and its index bytes
fn write_archive(cdn: &LocalCdn, members: &[&Object]) -> (String, Vec<u8>) {
    let mut blob = Vec::new();
    let mut entries = Vec::new();
    for object in members {
        entries.push((
            object.ekey().as_bytes().to_vec(),
            object.encoded.len() as u32,
            blob.len() as u32,
        ));
        blob.extend_from_slice(&object.encoded);
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    // Archives are named after their index footer, never after a member
    let index = archive_index(4, 16, &entries);
    let name = hex::encode(md5::compute(&index[index.len() - 28..]).0);
    store(cdn, &name, &blob);
    (name, index)
}

struct Build {
    _dir: TempDir,
    cdn: LocalCdn,
    archives: Vec<String>,
    group: IndexReader,
    encoding: EncodingReader,
    root: RootReader,
    objects: Vec<Object>,
}

fn build() -> Build {
    let dir = tempfile::tempdir().unwrap();
    let cdn = LocalCdn::new(dir.path().join("data"));
    let objects = objects();

    let (name_a, index_a) = write_archive(&cdn, &[&objects[0]]);
    let (name_b, index_b) = write_archive(&cdn, &[&objects[1], &objects[3]]);
    store(&cdn, &objects[2].ekey().to_hex(), &objects[2].encoded);

    let index_path = |name: &str| dir.path().join(format!("{name}.index"));
    std::fs::write(index_path(&name_a), index_a).unwrap();
    std::fs::write(index_path(&name_b), index_b).unwrap();

    let group = GroupIndexBuilder::new()
        .add_archive(0, IndexReader::open(index_path(&name_a)).unwrap())
        .add_archive(1, IndexReader::open(index_path(&name_b)).unwrap())
        .build()
        .unwrap();
    let group_path = group.write_to_dir(dir.path()).unwrap();

    let mut ckeys: Vec<_> = objects
        .iter()
        .map(|o| (*o.ckey().as_bytes(), o.payload.len() as u64, *o.ekey().as_bytes()))
        .collect();
    ckeys.sort_by(|a, b| a.0.cmp(&b.0));
    let mut ekeys: Vec<_> = objects
        .iter()
        .map(|o| (*o.ekey().as_bytes(), 0u32, o.encoded.len() as u64))
        .collect();
    ekeys.sort_by(|a, b| a.0.cmp(&b.0));
    let encoding_path = dir.path().join("encoding");
    std::fs::write(&encoding_path, encoding_file(&["n"], &ckeys, &ekeys)).unwrap();

    let records: Vec<_> = objects
        .iter()
        .map(|o| (o.fdid, *o.ckey().as_bytes(), name_hash(o.path)))
        .collect();
    let root = root_file(0x2, &records);
    let root_blte = blte_chunked(&[(zlib_chunk(&root), root.len())]);

    Build {
        cdn,
        archives: vec![name_a, name_b],
        group: IndexReader::open_with_settings(&group_path, &Settings::default()).unwrap(),
        encoding: EncodingReader::open(&encoding_path).unwrap(),
        root: RootReader::from_blte(
            &root_blte,
            &TactKeyStore::new(),
            &DecodeOptions::default().with_verify_checksums(true),
            &RootFilter::default(),
        )
        .unwrap(),
        objects,
        _dir: dir,
    }
}

fn resolve(build: &Build, keys: &TactKeyStore, fdid: u32) -> Option<Vec<u8>> {
    ContentResolver::new(&build.root, &build.encoding, &build.cdn, keys)
        .with_group_index(&build.group, &build.archives)
        .with_settings(Settings::default().with_verify_blte_checksums(true))
        .resolve_file_data_id(FileDataId::new(fdid))
        .unwrap()
        .map(|decoded| decoded.data)
}

#[test]
fn resolve_every_kind_of_object() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let build = build();
    let mut keys = TactKeyStore::new();
    keys.add(TactKey::new(SECRET_KEY_NAME, SECRET_KEY));

    for object in &build.objects {
        assert_eq!(
            resolve(&build, &keys, object.fdid).as_deref(),
            Some(&object.payload[..]),
            "fdid {}",
            object.fdid
        );
    }
    assert_eq!(resolve(&build, &keys, 999), None);
}

#[test]
fn resolve_by_path() {
    let build = build();
    let keys = TactKeyStore::new();
    let resolver = ContentResolver::new(&build.root, &build.encoding, &build.cdn, &keys)
        .with_group_index(&build.group, &build.archives);

    let decoded = resolver
        .resolve_path("Interface\\First.lua")
        .unwrap()
        .unwrap();
    assert_eq!(decoded.data, b"first archived file");
    assert!(resolver.resolve_path("interface/missing.lua").unwrap().is_none());
}

#[test]
fn missing_key_zero_fills_encrypted_chunk() {
    let build = build();
    let keys = TactKeyStore::new();
    let resolver = ContentResolver::new(&build.root, &build.encoding, &build.cdn, &keys)
        .with_group_index(&build.group, &build.archives);

    let decoded = resolver
        .resolve_file_data_id(FileDataId::new(400))
        .unwrap()
        .unwrap();
    assert!(!decoded.is_complete());
    assert_eq!(decoded.skipped.len(), 1);
    assert_eq!(decoded.skipped[0].key_name, SECRET_KEY_NAME);

    let head_len = b"public header, ".len();
    assert_eq!(&decoded.data[..head_len], b"public header, ");
    assert!(decoded.data[head_len..].iter().all(|&b| b == 0));
    assert_eq!(decoded.data.len(), build.objects[3].payload.len());
}

#[test]
fn archived_objects_need_the_group_index() {
    let build = build();
    let keys = TactKeyStore::new();
    let resolver = ContentResolver::new(&build.root, &build.encoding, &build.cdn, &keys);

    // Without the group index only loose files are reachable
    for object in &build.objects {
        assert!(!build.archives.contains(&object.ekey().to_hex()));
    }
    assert!(resolver.resolve_file_data_id(FileDataId::new(100)).unwrap().is_none());
    assert_eq!(
        resolver
            .resolve_file_data_id(FileDataId::new(300))
            .unwrap()
            .unwrap()
            .data,
        b"loose file outside every archive"
    );
}

#[test]
fn corrupted_archive_reports_blte_error() {
    let build = build();
    let keys = TactKeyStore::new();

    let archive = build.cdn.object_path(&build.archives[0]);
    let mut blob = std::fs::read(&archive).unwrap();
    blob[0] = b'X';
    std::fs::write(&archive, blob).unwrap();

    let resolver = ContentResolver::new(&build.root, &build.encoding, &build.cdn, &keys)
        .with_group_index(&build.group, &build.archives);
    assert!(matches!(
        resolver.resolve_file_data_id(FileDataId::new(100)),
        Err(ResolveError::Blte(_))
    ));
}

// --- BLTE properties over fetched bytes ---

fn fetch_loose(cdn: &LocalCdn, ekey: &EncodingKey) -> Vec<u8> {
    cdn.fetch_file(ekey).unwrap().unwrap().to_vec()
}

#[test]
fn raw_single_chunk_is_tail_of_file() {
    let build = build();
    let loose = &build.objects[2];
    let data = fetch_loose(&build.cdn, &loose.ekey());

    let decoded = blte::decode(&data, &TactKeyStore::new(), &DecodeOptions::default()).unwrap();
    assert_eq!(decoded.data.len(), data.len() - 9);
    assert_eq!(decoded.data, &data[9..]);

    let again = blte::decode(&data, &TactKeyStore::new(), &DecodeOptions::default()).unwrap();
    assert_eq!(decoded, again);
}

#[test]
fn local_cdn_paths_are_sharded() {
    let cdn = LocalCdn::new(Path::new("/srv/tpr/wow/data"));
    assert_eq!(
        cdn.object_path("0017A402F556FBECE46C38DC431A2C9B"),
        Path::new("/srv/tpr/wow/data/00/17/0017a402f556fbece46c38dc431a2c9b")
    );
}
