//! 结果合并 - 业务能力层
//!
//! 把各批次返回的 PDF / ZIP 合并为一个文件。
//! 两种合并都是纯函数，输入字节、输出字节，不依赖网络

use crate::error::MergeError;
use crate::models::{FinalArtifact, OutputKind, PartialArtifact};
use lopdf::{dictionary, Document as LoDocument, Object as LoObject, ObjectId as LoObjectId};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// 页面可从父节点继承的属性
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// 合并一个任务的所有批次结果
///
/// 批次按序号升序拼接，与网络返回顺序无关
pub fn merge(
    mut partials: Vec<PartialArtifact>,
    kind: OutputKind,
) -> Result<FinalArtifact, MergeError> {
    partials.sort_by_key(|p| p.index);
    let parts: Vec<Vec<u8>> = partials.into_iter().map(|p| p.bytes).collect();

    let bytes = if kind.is_document() {
        merge_documents(&parts)?
    } else {
        merge_archives(&parts)?
    };

    Ok(FinalArtifact::new(kind, bytes))
}

/// 合并多个 PDF，逐页追加
///
/// 单个输入同样走完整流程，输出页数与输入一致
pub fn merge_documents<B: AsRef<[u8]>>(parts: &[B]) -> Result<Vec<u8>, MergeError> {
    if parts.is_empty() {
        return Err(MergeError::Empty);
    }

    let mut merged = LoDocument::with_version("1.5");
    let pages_id = merged.new_object_id();
    let mut kids: Vec<LoObject> = Vec::new();

    for (index, bytes) in parts.iter().enumerate() {
        let src = LoDocument::load_mem(bytes.as_ref()).map_err(|e| MergeError::CorruptDocument {
            index,
            reason: e.to_string(),
        })?;
        if src.is_encrypted() {
            return Err(MergeError::EncryptedDocument { index });
        }

        let page_ids = import_document_objects(&mut merged, src);
        if page_ids.is_empty() {
            return Err(MergeError::EmptyDocument { index });
        }
        debug!("第 {} 份文档: {} 页", index + 1, page_ids.len());

        for page_id in page_ids {
            let inherited = inherited_attributes(&merged, page_id);
            let page = merged
                .get_object_mut(page_id)
                .and_then(LoObject::as_dict_mut)
                .map_err(|e| MergeError::CorruptDocument {
                    index,
                    reason: e.to_string(),
                })?;
            for (key, value) in inherited {
                if !page.has(key) {
                    page.set(key.to_vec(), value);
                }
            }
            page.set("Parent", pages_id);
            kids.push(LoObject::Reference(page_id));
        }
    }

    let page_count = kids.len() as i64;
    merged.objects.insert(
        pages_id,
        LoObject::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    // 各输入原有的 Catalog / Pages 已不可达
    merged.prune_objects();
    merged.renumber_objects();
    merged.compress();

    let mut out = Vec::new();
    merged
        .save_to(&mut out)
        .map_err(|e| MergeError::WriteFailed(e.to_string()))?;
    Ok(out)
}

/// 把 src 的全部对象重新编号后并入 dst，返回 src 的页面（按页码顺序）
fn import_document_objects(dst: &mut LoDocument, mut src: LoDocument) -> Vec<LoObjectId> {
    let start_id = dst.max_id + 1;
    src.renumber_objects_with(start_id);
    let page_ids: Vec<LoObjectId> = src.get_pages().values().copied().collect();
    if src.max_id > dst.max_id {
        dst.max_id = src.max_id;
    }
    dst.objects.extend(src.objects);
    page_ids
}

/// 沿 Parent 链收集页面缺失的可继承属性，近处优先
fn inherited_attributes(doc: &LoDocument, page_id: LoObjectId) -> Vec<(&'static [u8], LoObject)> {
    let mut found: Vec<(&'static [u8], LoObject)> = Vec::new();
    let mut current = doc
        .get_object(page_id)
        .and_then(LoObject::as_dict)
        .and_then(|page| page.get(b"Parent"))
        .and_then(LoObject::as_reference)
        .ok();

    // 防止损坏文件中的环
    let mut depth = 0;
    while let Some(parent_id) = current {
        if depth > 64 {
            break;
        }
        let Ok(parent) = doc.get_object(parent_id).and_then(LoObject::as_dict) else {
            break;
        };
        for key in INHERITABLE_KEYS {
            if found.iter().any(|(k, _)| *k == key) {
                continue;
            }
            if let Ok(value) = parent.get(key) {
                found.push((key, value.clone()));
            }
        }
        current = parent.get(b"Parent").and_then(LoObject::as_reference).ok();
        depth += 1;
    }

    found
}

enum ArchiveEntry {
    Directory,
    File(Vec<u8>),
}

/// 合并多个 ZIP，按相对路径复制所有条目
///
/// 条目顺序为首次出现的顺序；路径重复时后出现的内容覆盖先前的内容
pub fn merge_archives<B: AsRef<[u8]>>(parts: &[B]) -> Result<Vec<u8>, MergeError> {
    if parts.is_empty() {
        return Err(MergeError::Empty);
    }

    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, ArchiveEntry> = HashMap::new();

    for (index, bytes) in parts.iter().enumerate() {
        let corrupt = |reason: String| MergeError::CorruptArchive { index, reason };

        let mut archive = ZipArchive::new(Cursor::new(bytes.as_ref())).map_err(|e| corrupt(e.to_string()))?;
        for i in 0..archive.len() {
            let mut file = archive.by_index(i).map_err(|e| corrupt(e.to_string()))?;
            let name = file.name().to_string();
            if file.enclosed_name().is_none() {
                return Err(corrupt(format!("非法条目路径: {}", name)));
            }

            let entry = if file.is_dir() {
                ArchiveEntry::Directory
            } else {
                let mut data = Vec::new();
                file.read_to_end(&mut data).map_err(|e| corrupt(e.to_string()))?;
                ArchiveEntry::File(data)
            };

            if entries.insert(name.clone(), entry).is_some() {
                debug!("压缩包条目重复，使用第 {} 个压缩包中的版本: {}", index + 1, name);
            } else {
                order.push(name);
            }
        }
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let write_err = |e: zip::result::ZipError| MergeError::WriteFailed(e.to_string());

    for name in order {
        match entries.remove(&name) {
            Some(ArchiveEntry::Directory) => {
                writer.add_directory(name, options).map_err(write_err)?;
            }
            Some(ArchiveEntry::File(data)) => {
                writer.start_file(name, options).map_err(write_err)?;
                writer
                    .write_all(&data)
                    .map_err(|e| MergeError::WriteFailed(e.to_string()))?;
            }
            None => {}
        }
    }

    let cursor = writer.finish().map_err(write_err)?;
    Ok(cursor.into_inner())
}
