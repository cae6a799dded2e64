use crate::error::PartitionError;

/// Reparte índices de elementos con peso en `k` grupos intentando
/// equilibrar la suma de pesos de cada grupo (heurística LPT):
///
/// 1. ordena los elementos por peso descendente (orden estable),
/// 2. cada elemento va al grupo con menor suma acumulada,
///    en empate gana el grupo de índice más bajo.
///
/// Devuelve siempre `k` grupos; alguno puede quedar vacío si hay pesos 0.
/// Una lista vacía devuelve cero grupos.
pub fn group_indexes(weights: &[u64], k: usize) -> Result<Vec<Vec<usize>>, PartitionError> {
    if weights.is_empty() {
        return Ok(Vec::new());
    }
    if k == 0 {
        return Err(PartitionError::ZeroGroups {
            items: weights.len(),
        });
    }

    let mut order: Vec<usize> = (0..weights.len()).collect();
    // sort_by es estable: a igual peso se respeta el orden original
    order.sort_by(|a, b| weights[*b].cmp(&weights[*a]));

    let mut groups: Vec<Vec<usize>> = vec![Vec::new(); k];
    let mut sums: Vec<u64> = vec![0; k];

    for idx in order {
        let target = lightest_group(&sums);
        groups[target].push(idx);
        sums[target] += weights[idx];
    }

    Ok(groups)
}

/// Igual que [`group_indexes`] pero descartando los grupos vacíos.
pub fn balanced_groups(weights: &[u64], k: usize) -> Result<Vec<Vec<usize>>, PartitionError> {
    let groups = group_indexes(weights, k)?;
    Ok(groups.into_iter().filter(|g| !g.is_empty()).collect())
}

fn lightest_group(sums: &[u64]) -> usize {
    let mut best = 0;
    for (i, s) in sums.iter().enumerate().skip(1) {
        if *s < sums[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_partition(groups: &[Vec<usize>], n: usize) {
        let mut seen: Vec<usize> = groups.iter().flatten().copied().collect();
        seen.sort();
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn lista_vacia_no_genera_grupos() {
        assert!(group_indexes(&[], 6).unwrap().is_empty());
        assert!(group_indexes(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn cero_grupos_con_elementos_es_error() {
        let err = group_indexes(&[1, 2], 0).unwrap_err();
        assert_eq!(err, PartitionError::ZeroGroups { items: 2 });
    }

    #[test]
    fn tres_elementos_en_tres_grupos_uno_por_grupo() {
        // el de peso 20 se asigna primero, al grupo 0
        let groups = group_indexes(&[10, 20, 5], 3).unwrap();
        assert_eq!(groups, vec![vec![1], vec![0], vec![2]]);
    }

    #[test]
    fn cada_indice_aparece_exactamente_una_vez() {
        let weights = [7, 3, 9, 1, 1, 12, 0, 5, 5, 8, 2];
        for k in 1..=weights.len() {
            let groups = group_indexes(&weights, k).unwrap();
            assert_eq!(groups.len(), k);
            assert_is_partition(&groups, weights.len());
        }
    }

    #[test]
    fn pesos_uniformes_quedan_balanceados() {
        let weights = vec![20u64; 10];
        let groups = group_indexes(&weights, 6).unwrap();
        let sizes: Vec<usize> = groups.iter().map(|g| g.len()).collect();
        let max = *sizes.iter().max().unwrap();
        let min = *sizes.iter().min().unwrap();
        assert!(max - min <= 1, "tamaños desbalanceados: {:?}", sizes);
    }

    #[test]
    fn elige_siempre_el_grupo_mas_liviano() {
        // 8 -> g0, 7 -> g1, 6 -> g1 (7 < 8), 5 -> g0
        let groups = group_indexes(&[8, 7, 6, 5], 2).unwrap();
        assert_eq!(groups, vec![vec![0, 3], vec![1, 2]]);
    }

    #[test]
    fn pesos_cero_pueden_dejar_grupos_vacios_y_balanced_los_descarta() {
        let weights = [0, 0, 0];
        let groups = group_indexes(&weights, 3).unwrap();
        assert_eq!(groups, vec![vec![0, 1, 2], vec![], vec![]]);

        let compact = balanced_groups(&weights, 3).unwrap();
        assert_eq!(compact, vec![vec![0, 1, 2]]);
    }
}
